// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::std_instead_of_core,
    clippy::semicolon_if_nothing_returned
)] // conformance tests rely on asserts/unwraps and std conveniences

use crate::*;
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use test_generator::test_resources;

use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

#[derive(Deserialize, Debug, Clone, Copy)]
#[serde(rename_all = "snake_case")]
enum Flag {
    LeftScalarExpandable,
    RightScalarExpandable,
    EitherScalarExpandable,
    LeftIsDeferredShape,
    RightIsDeferredShape,
    BothDeferredShape,
}

impl From<Flag> for CheckConformanceFlags {
    fn from(flag: Flag) -> Self {
        match flag {
            Flag::LeftScalarExpandable => CheckConformanceFlags::LEFT_SCALAR_EXPANDABLE,
            Flag::RightScalarExpandable => CheckConformanceFlags::RIGHT_SCALAR_EXPANDABLE,
            Flag::EitherScalarExpandable => CheckConformanceFlags::EITHER_SCALAR_EXPANDABLE,
            Flag::LeftIsDeferredShape => CheckConformanceFlags::LEFT_IS_DEFERRED_SHAPE,
            Flag::RightIsDeferredShape => CheckConformanceFlags::RIGHT_IS_DEFERRED_SHAPE,
            Flag::BothDeferredShape => CheckConformanceFlags::BOTH_DEFERRED_SHAPE,
        }
    }
}

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
struct TestCase {
    note: String,
    /// Extents; `null` marks an extent unknown at compile time.
    left: Vec<Option<i64>>,
    right: Vec<Option<i64>>,
    #[serde(default)]
    flags: Vec<Flag>,
    expected: Option<bool>,
    message: Option<String>,
}

#[derive(Deserialize, Debug)]
struct YamlTest {
    cases: Vec<TestCase>,
}

fn to_shape(extents: &[Option<i64>]) -> Shape {
    extents
        .iter()
        .map(|extent| extent.map(ExtentExpr::Constant))
        .collect()
}

fn check_case(case: &TestCase) -> Result<()> {
    let flags = case
        .flags
        .iter()
        .fold(CheckConformanceFlags::NONE, |flags, flag| {
            flags | CheckConformanceFlags::from(*flag)
        });

    let mut messages = Messages::new();
    let result = check_conformance(
        &mut messages,
        &to_shape(&case.left),
        &to_shape(&case.right),
        flags,
        "left operand",
        "right operand",
    );
    if result != case.expected {
        bail!("expected {:?}, got {:?}", case.expected, result);
    }

    if result == Some(false) {
        assert!(messages.any_errors(), "a mismatch must be reported");
    } else {
        assert!(messages.is_empty(), "unexpected messages: {messages:?}");
    }

    if let Some(expected) = &case.message {
        let texts: Vec<&str> = messages.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, [expected.as_str()]);
    }
    Ok(())
}

fn yaml_test_impl(file: &str) -> Result<()> {
    std::println!("\nrunning {file}");

    let yaml_str = std::fs::read_to_string(file).with_context(|| format!("reading {file}"))?;
    let test: YamlTest = serde_yaml::from_str(&yaml_str)?;

    for case in &test.cases {
        std::print!("case {} ", case.note);
        check_case(case).with_context(|| format!("case `{}`", case.note))?;
        std::println!("passed");
    }

    std::println!("{} cases passed.", test.cases.len());
    Ok(())
}

#[test_resources("tests/conformance/**/*.yaml")]
fn run(path: &str) {
    yaml_test_impl(path).unwrap()
}
