pub mod canonical_host;
