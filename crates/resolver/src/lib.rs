//! # Resolver
//!
//! 数据报目标的主机名解析模块。
//!
//! 负责：
//! - 为每个 datagram 目标维护 `{address, valid}` 解析缓存
//! - 自适应周期：存在无效目标时短间隔，否则长间隔
//! - 解析失败上报 `ErrorSink`，不影响分发

mod cell;
mod lookup;
mod scheduler;

pub use cell::{resolution_cell, Resolution, ResolutionPublisher, ResolutionView};
pub use lookup::{HostLookup, LocalHostLookup, SystemLookup};
pub use scheduler::{ResolverIntervals, TargetResolver};
