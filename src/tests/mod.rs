// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

mod common;
mod conformance;
mod fold;
mod intrinsics;
