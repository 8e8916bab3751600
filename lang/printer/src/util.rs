use pretty::DocAllocator;

use super::tokens::*;
use super::types::*;

pub trait ParensExt<'a, D, A: 'a>
where
    D: ?Sized + DocAllocator<'a, A>,
{
    fn parens(self) -> pretty::DocBuilder<'a, D, A>;
    fn brackets(self) -> pretty::DocBuilder<'a, D, A>;
    fn braces(self) -> pretty::DocBuilder<'a, D, A>;
}

impl<'a, D, A> ParensExt<'a, D, A> for pretty::DocBuilder<'a, D, A>
where
    D: ?Sized + DocAllocator<'a, A>,
{
    fn parens(self) -> pretty::DocBuilder<'a, D, A> {
        self.enclose(LPAREN, RPAREN)
    }

    fn brackets(self) -> pretty::DocBuilder<'a, D, A> {
        self.enclose(LBRACKET, RBRACKET)
    }

    fn braces(self) -> pretty::DocBuilder<'a, D, A> {
        self.enclose(LBRACE, RBRACE)
    }
}

/// An s-expression node: `(head child1 child2 ...)`, broken over several
/// indented lines when it does not fit the configured width.
pub fn node<'a, I>(cfg: &PrintCfg, alloc: &'a Alloc<'a>, head: Builder<'a>, children: I) -> Builder<'a>
where
    I: IntoIterator<Item = Builder<'a>>,
{
    let children: Vec<_> = children.into_iter().collect();
    if children.is_empty() {
        return head.parens();
    }
    head.append(alloc.line().append(alloc.intersperse(children, alloc.line())).nest(cfg.indent))
        .group()
        .parens()
}

/// A bracketed, comma-free list: `[a b c]`.
pub fn list<'a, I>(cfg: &PrintCfg, alloc: &'a Alloc<'a>, items: I) -> Builder<'a>
where
    I: IntoIterator<Item = Builder<'a>>,
{
    let items: Vec<_> = items.into_iter().collect();
    if items.is_empty() {
        return alloc.nil().brackets();
    }
    alloc
        .line_()
        .append(alloc.intersperse(items, alloc.line()))
        .nest(cfg.indent)
        .append(alloc.line_())
        .group()
        .brackets()
}
