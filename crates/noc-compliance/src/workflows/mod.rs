pub mod noc;
