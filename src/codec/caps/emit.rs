use bytes::{BufMut, BytesMut};

use crate::codec::caps::typ::CapCode;

/// Common shape every capability value shares: a code, a value length, and
/// an encoder for the value bytes. `emit` wraps that in the outer
/// optional-parameter TLV (type=2 "Capability") the OPEN message carries it
/// in, unless `skip_param_wrapper` is set (used when a single optional
/// parameter bundles multiple capability TLVs back to back).
pub trait CapEmit {
    fn code(&self) -> CapCode;

    fn len(&self) -> u8 {
        0
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn emit_value(&self, _buf: &mut BytesMut) {}

    fn emit(&self, buf: &mut BytesMut, skip_param_wrapper: bool) {
        const CAPABILITY_OPT_PARAM_TYPE: u8 = 2;
        if !skip_param_wrapper {
            buf.put_u8(CAPABILITY_OPT_PARAM_TYPE);
            buf.put_u8(self.len() + 2);
        }
        buf.put_u8(self.code().into());
        buf.put_u8(self.len());
        self.emit_value(buf);
    }
}
