/// Architecture support. Only 32-bit x86 is a boot target; the x86_64
/// build exists so the workspace compiles and tests on a development host.
pub mod x86;
