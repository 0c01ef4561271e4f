// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Package manifest and deployment generation for Symbian targets.
//!
//! sisgen reads a declarative project definition, and produces everything a
//! packaging tool needs to build an installable package out of it:
//!
//! - Concrete file copy directives for device, emulator, or ROM platforms.
//! - Main, installer, and stub package manifests.
//! - Application registration and caption resource sources.
//! - Plugin stub files standing in for loadable plugins.
//!
//! Generation is best-effort. Only an unreadable project definition is a hard
//! error. Everything else degrades to a logged warning plus a documented
//! default, or to a narrowly scoped omission of one artifact.

pub mod config;
pub mod deploy;
pub mod localize;
pub mod manifest;
pub mod path;
pub mod project;
pub mod resource;
pub mod uid;
