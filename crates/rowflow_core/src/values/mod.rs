pub mod datatype;
pub mod parse;
pub mod physical_type;
pub mod row;
pub mod scalar;
pub mod schema;
