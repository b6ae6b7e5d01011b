mod monitor;
mod probe;

pub use monitor::ConnectivityMonitor;
pub use probe::ReachabilityProbe;
