//! Transformation passes over ASR.
//!
//! Every pass lowers one high-level construct into simpler nodes of the same tree and
//! leaves a tree that still satisfies the verifier. The [`PassManager`] decides which
//! passes run, in which order, and re-checks the tree between them.

mod manager;
mod options;
mod result;
pub mod utils;

mod arr_slice;
mod class_constructor;
mod global_stmts;
mod implied_do_loops;
mod inline_function_calls;
mod instantiate_template;
mod print_arr;
mod print_list_tuple;
mod promote_allocatable;
mod unused_functions;
mod where_construct;

pub use manager::*;
pub use options::*;
pub use result::*;

pub use arr_slice::arr_slice;
pub use class_constructor::class_constructor;
pub use global_stmts::global_stmts;
pub use implied_do_loops::implied_do_loops;
pub use inline_function_calls::inline_function_calls;
pub use instantiate_template::instantiate_template;
pub use print_arr::print_arr;
pub use print_list_tuple::print_list_tuple;
pub use promote_allocatable::promote_allocatable_to_nonallocatable;
pub use unused_functions::unused_functions;
pub use where_construct::where_construct;
