// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Ridepool Maintainers

//! Outbound collaborator clients: the identity provider's administrative
//! API and S3-compatible object storage, plus the request signing both
//! share.

pub mod cognito;
pub mod s3;
pub mod sigv4;
