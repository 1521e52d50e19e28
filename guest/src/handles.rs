//! Typed handles returned by the create calls.

use wasi_llm_primitives::RawHandle;

macro_rules! guest_handle {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, PartialEq, Eq)]
        pub struct $name(RawHandle);

        impl $name {
            /// Wrap a handle value received from the host.
            pub fn from_raw(raw: RawHandle) -> Self {
                Self(raw)
            }

            pub fn raw(&self) -> RawHandle {
                self.0
            }

            /// Address of the handle value, for calls that take handles by reference.
            #[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
            pub(crate) fn slot(&self) -> *const RawHandle {
                &self.0
            }
        }
    };
}

guest_handle!(
    /// A model owned by the host.
    ModelHandle
);
guest_handle!(
    /// A data loader owned by the host.
    DataLoaderHandle
);
guest_handle!(
    /// A tokenizer owned by the host.
    TokenizerHandle
);
