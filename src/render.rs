pub(crate) mod overlay;
pub(crate) mod scheduler;
pub(crate) mod wrap;
