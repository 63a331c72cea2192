pub(crate) mod backend;
pub(crate) mod charts;
pub(crate) mod pipeline;
