pub(crate) mod collection;
pub(crate) mod dsl;
pub(crate) mod page;
