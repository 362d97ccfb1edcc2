pub(crate) mod demux;
pub(crate) mod inspect;
pub(crate) mod replace;
pub(crate) mod scan;
