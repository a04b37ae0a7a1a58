//! Mercury-230 meter client implementation
//!
//! This crate provides the command set, the session configuration and the
//! blocking [`MeterClient`] that polls one meter over a serial line or a
//! transparent TCP gateway.
//!
//! # Features
//!
//! ## 会话
//! - [x] 链路测试、打开通道（用户/管理员级别）
//! - [x] 超时与重试（固定间隔）
//! - [x] 通道在 close() 或 Drop 时恰好关闭一次
//!
//! ## 读取
//! - [x] 电表护照（网络地址、序列号、生产日期、固件版本、变比）
//! - [x] 清零以来的电能（总、T1-T4、损耗）
//! - [x] 月度存档（单月 / 全部 12 个月）
//!
//! ## 输出
//! - [x] 护照与电能的 JSON 视图（精确十进制字符串）

pub mod builder;
pub mod client;
pub mod command;
pub mod config;
pub mod present;

#[cfg(test)]
mod testing;

pub use builder::MeterClientBuilder;
pub use client::MeterClient;
pub use command::{Command, EnergyPeriod, Parameter, Response};
pub use config::{
    AccessLevel, MeterConfig, Password, DEFAULT_BAUD_RATE, DEFAULT_RETRIES, DEFAULT_RETRY_DELAY,
    DEFAULT_TIMEOUT,
};
pub use present::{as_dict, format_energy_from_reset};
