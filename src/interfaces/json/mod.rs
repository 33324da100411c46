pub mod catalog_seed;
