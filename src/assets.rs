pub(crate) mod fonts;
pub(crate) mod library;
pub(crate) mod media;
