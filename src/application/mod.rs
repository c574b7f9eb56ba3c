// Application layer - Rendering, binning and scheduling core
pub mod binning;
pub mod chart_component;
pub mod charts;
pub mod color;
pub mod data_source;
pub mod frame_scheduler;
pub mod live_session;
pub mod performance_sampler;
pub mod regression;
pub mod render_loop;
pub mod scale;
