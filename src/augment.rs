use crate::models::{MergedDocument, Parameter};

/// Append the authorization header parameter to every operation.
///
/// The header is appended unconditionally, without looking for an existing
/// one, so this must run exactly once per merged document. Returns the
/// number of operations touched.
pub fn add_authorization_header(document: &mut MergedDocument) -> usize {
    let header = Parameter::authorization_header();
    let mut touched = 0;

    for item in document.paths.values_mut() {
        for operation in item.operations_mut() {
            operation.parameters.push(header.clone());
            touched += 1;
        }
    }

    touched
}
