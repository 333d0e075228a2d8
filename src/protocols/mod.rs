pub mod ogp;
