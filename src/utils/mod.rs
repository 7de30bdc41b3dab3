pub mod format;
pub mod hijri;
pub mod i18n;
