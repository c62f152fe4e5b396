//! Keyed MD5 digest over the signed redirect fields.
//!
//! MD5 is the provider's compatibility contract for the classic redirect
//! protocol, not an integrity choice; swapping in a stronger hash
//! without coordinating with the provider breaks interoperability.

use md5::{Digest, Md5};

/// Separator joining the secret and the signed values. Field values must
/// not contain it unescaped or the digest becomes ambiguous.
pub const SIGNATURE_SEPARATOR: char = ':';

/// Fields covered by the outbound signature, in signing order. The same
/// list is sent to the provider as the `signatureFields` descriptor, so
/// both sides agree on what was signed. Changing the order or the set
/// here changes the descriptor in lockstep.
pub const SIGNATURE_FIELDS: [&str; 6] = [
    "instId",
    "amount",
    "currency",
    "cartId",
    "MC_orderId",
    "MC_callback",
];

/// The `signatureFields` descriptor value, e.g.
/// `instId:amount:currency:cartId:MC_orderId:MC_callback`.
pub fn signature_fields_descriptor() -> String {
    SIGNATURE_FIELDS.join(&SIGNATURE_SEPARATOR.to_string())
}

/// Computes the keyed digest: `md5(secret:value1:value2:...)`, hex
/// encoded. Deterministic; the caller guarantees a non-empty secret.
pub fn compute_signature<S: AsRef<str>>(secret: &str, ordered_values: &[S]) -> String {
    let mut payload = String::from(secret);
    for value in ordered_values {
        payload.push(SIGNATURE_SEPARATOR);
        payload.push_str(value.as_ref());
    }
    hex::encode(Md5::digest(payload.as_bytes()))
}
