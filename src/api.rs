pub mod modbus;
pub mod multiplus;
