// Copyright 2025 the Quire Authors
// SPDX-License-Identifier: Apache-2.0

//! Quire: run an editing script against a JSON note store

fn main() -> anyhow::Result<()> {
    quire::run()
}
