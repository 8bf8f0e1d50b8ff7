pub mod tdx;
