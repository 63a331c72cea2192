pub(crate) mod expand;
pub(crate) mod intent;
pub(crate) mod resolve;
