use wasi_llm_primitives::ErrNo;

/// Convert an i32 host status to a Result.
///
/// Codes the guest does not know are treated as `Internal`.
pub fn check_status(code: i32) -> Result<(), ErrNo> {
    match ErrNo::from_i32(code) {
        Some(ErrNo::Success) => Ok(()),
        Some(errno) => Err(errno),
        None => Err(ErrNo::Internal),
    }
}
