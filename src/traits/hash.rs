/// Message digest capability used by the Secrets and Hash kernels.
pub trait HashFunction: Send + Sync {
    /// Lowercase hexadecimal digest of `input`.
    fn hex_digest(&self, input: &[u8]) -> String;

    fn name(&self) -> &'static str;
}
