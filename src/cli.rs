pub(crate) mod align;
pub(crate) mod model;
