//! C++ declarations for algorithms and interfaces.
//!
//! Output is a pure function of the model: items are emitted in declaration
//! order, so rendering the same value twice gives byte-identical text.

use std::fmt;

use genco::prelude::*;
use log::debug;

use crate::model::*;

mod cpp;

pub use cpp::{Decl, Param};

pub fn render_data_block(block: &DataBlock) -> Result<String, fmt::Error> {
    let tokens: Tokens = quote!(#block);
    tokens.to_file_string()
}

pub fn render_algorithm(algorithm: &Algorithm) -> Result<String, fmt::Error> {
    debug!(
        "Rendering algorithm {} ({} callbacks, {} functions)",
        algorithm.name,
        algorithm.callbacks.len(),
        algorithm.functions.len()
    );
    let tokens: Tokens = quote!(#algorithm);
    tokens.to_file_string()
}

pub fn render_interface(interface: &Interface) -> Result<String, fmt::Error> {
    debug!(
        "Rendering interface {} ({} algorithms)",
        interface.name,
        interface.algorithms.len()
    );
    let tokens: Tokens = quote! {
        ##pragma once

        #interface
    };
    tokens.to_file_string()
}
