pub(crate) mod artists;
pub(crate) mod helpers;
pub(crate) mod shows;
pub(crate) mod venues;
