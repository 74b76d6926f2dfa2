pub(crate) mod piper;
