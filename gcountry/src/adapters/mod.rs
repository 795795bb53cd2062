#[cfg(feature = "rest-countries")]
pub mod rest_countries;
