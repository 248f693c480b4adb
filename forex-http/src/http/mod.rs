pub mod forex_v1;
