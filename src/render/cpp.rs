use genco::prelude::*;

use crate::model::*;

/// The only place that knows how base types are spelled in C++.
impl FormatInto<()> for BaseType {
    fn format_into(self: Self, tokens: &mut Tokens) {
        match self {
            BaseType::Int => quote_in!(*tokens => int),
        }
    }
}

/// Type of a variable passed around by pointer: one level per dimension.
struct PointerTy<'a>(&'a Variable);

impl FormatInto<()> for PointerTy<'_> {
    fn format_into(self: Self, tokens: &mut Tokens) {
        let stars = "*".repeat(self.0.dimensions());
        quote_in!(*tokens => #(self.0.base_type)#stars)
    }
}

/// A function parameter, e.g. `int* data`.
pub struct Param<'a>(pub &'a Variable);

impl FormatInto<()> for Param<'_> {
    fn format_into(self: Self, tokens: &mut Tokens) {
        let Param(var) = self;
        quote_in!(*tokens => #(PointerTy(var)) #(&var.name))
    }
}

/// A storage declaration, e.g. `int grid[3][4];`.
///
/// Arrays with an unbounded dimension are declared as pointers and
/// allocated by the generated program.
pub struct Decl<'a>(pub &'a Variable);

impl FormatInto<()> for Decl<'_> {
    fn format_into(self: Self, tokens: &mut Tokens) {
        let Decl(var) = self;
        match var.fixed_extents() {
            Some(extents) => {
                let dims: String = extents.iter().map(|n| format!("[{}]", n)).collect();
                quote_in!(*tokens => #(var.base_type) #(&var.name)#dims;)
            }
            None => quote_in!(*tokens => #(PointerTy(var)) #(&var.name);),
        }
    }
}

impl FormatInto<()> for &DataBlock {
    fn format_into(self: Self, tokens: &mut Tokens) {
        quote_in! { *tokens =>
            #(for var in self.iter() join (#<push>) => #(Decl(var)))
        }
    }
}

impl FormatInto<()> for &AlgorithmFunction {
    fn format_into(self: Self, tokens: &mut Tokens) {
        let AlgorithmFunction {
            name,
            parameters,
            return_type,
        } = self;
        quote_in! { *tokens =>
            #(match return_type {
                Some(ty) => #(*ty),
                None => void,
            }) #name(#(
                for p in parameters join (, ) =>
                #(Param(p))
            ));
        }
    }
}

impl FormatInto<()> for &Algorithm {
    fn format_into(self: Self, tokens: &mut Tokens) {
        let Algorithm {
            name,
            data,
            callbacks,
            functions,
        } = self;
        quote_in! { *tokens =>
            namespace #name {
                #data
                #(for c in callbacks join (#<push>) => #c)
                #(for f in functions join (#<push>) => #f)
            }
        }
    }
}

impl FormatInto<()> for &Interface {
    fn format_into(self: Self, tokens: &mut Tokens) {
        let Interface { name, algorithms } = self;
        quote_in! { *tokens =>
            namespace #name {
                #(for a in algorithms join (#<line>) => #a)
            }
        }
    }
}
