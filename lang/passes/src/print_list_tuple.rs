//! Lowers printing of list and tuple values into prints of their brackets and items.

use lasr_lang_asr::{Asr, BinOp, CmpOp, ExprId, ExprKind, Location, StmtId, StmtKind, SymtabId, Ttype};

use crate::options::PassOptions;
use crate::result::PassResult;
use crate::utils::{BodyCtx, BodyRewriter, Rewrite, index_variable, int_op, print_with, rewrite_bodies, set_loc};

pub fn print_list_tuple(asr: &mut Asr, _options: &PassOptions) -> PassResult {
    rewrite_bodies(&mut PrintListTuple, asr)
}

struct PrintListTuple;

fn is_container(asr: &Asr, expr: ExprId) -> bool {
    matches!(asr.expr_type(expr).map(Ttype::past_wrappers), Some(Ttype::List(_) | Ttype::Tuple(_)))
}

impl BodyRewriter for PrintListTuple {
    fn rewrite_stmt(&mut self, asr: &mut Asr, ctx: BodyCtx, stmt: StmtId) -> PassResult<Rewrite> {
        let StmtKind::Print { values, separator, end } = asr.stmt(stmt).kind.clone() else {
            return Ok(Rewrite::Keep);
        };
        if !values.iter().any(|value| is_container(asr, *value)) {
            return Ok(Rewrite::Keep);
        }

        let mut out = Vec::new();
        let mut plain = Vec::new();
        let last = values.len() - 1;
        for (k, value) in values.into_iter().enumerate() {
            if !is_container(asr, value) {
                plain.push(value);
                continue;
            }
            if !plain.is_empty() {
                let gap = between(asr, separator);
                out.push(print_with(asr, std::mem::take(&mut plain), separator, Some(gap)));
            }
            let closing_end = if k == last { end } else { Some(between(asr, separator)) };
            let mut lowering = Lowering { asr: &mut *asr, scope: ctx.scope, out: &mut out };
            lowering.container(value, closing_end, 0)?;
        }
        if !plain.is_empty() {
            out.push(print_with(asr, plain, separator, end));
        }
        let loc = asr.stmt(stmt).loc;
        set_loc(asr, &out, loc);
        Ok(Rewrite::Replace(out))
    }
}

/// What goes between two printed values: the separator, or a single space.
fn between(asr: &mut Asr, separator: Option<ExprId>) -> ExprId {
    separator.unwrap_or_else(|| asr.string(" "))
}

struct Lowering<'a> {
    asr: &'a mut Asr,
    scope: SymtabId,
    out: &'a mut Vec<StmtId>,
}

impl Lowering<'_> {
    /// Print `text` without a line break.
    fn text(&mut self, text: &str) {
        let value = self.asr.string(text);
        self.piece(vec![value]);
    }

    fn piece(&mut self, values: Vec<ExprId>) {
        let (sep, end) = (self.asr.string(""), self.asr.string(""));
        self.out.push(print_with(self.asr, values, Some(sep), Some(end)));
    }

    /// Print a list or tuple value, then `end`.
    fn container(&mut self, value: ExprId, end: Option<ExprId>, depth: usize) -> PassResult {
        let ty = self.asr.expr_type(value).map(|ty| ty.past_wrappers().clone());
        match ty {
            Some(Ttype::List(elem)) => {
                self.text("[");
                self.list_items(value, *elem, depth)?;
                let close = self.asr.string("]");
                let sep = self.asr.string("");
                self.out.push(print_with(self.asr, vec![close], Some(sep), end));
            }
            Some(Ttype::Tuple(elems)) => {
                self.text("(");
                for (pos, elem) in elems.into_iter().enumerate() {
                    if pos > 0 {
                        self.text(", ");
                    }
                    let pos_expr = self.asr.int(pos as i64);
                    let item = self.item(ExprKind::TupleItem { a: value, pos: pos_expr, ty: elem });
                    self.element(item, depth)?;
                }
                let close = self.asr.string(")");
                let sep = self.asr.string("");
                self.out.push(print_with(self.asr, vec![close], Some(sep), end));
            }
            _ => self.out.push(print_with(self.asr, vec![value], None, end)),
        }
        Ok(())
    }

    /// `do i = 0, len(value) - 1` printing every item followed by `", "` except the last.
    fn list_items(&mut self, value: ExprId, elem: Ttype, depth: usize) -> PassResult {
        let name = match depth {
            0 => "__list_iterator".to_owned(),
            depth => format!("__list_iterator{depth}"),
        };
        let iterator = index_variable(self.asr, self.scope, &name)?;
        let len = self.item(ExprKind::ListLen { arg: value, ty: Ttype::int() });
        let one = self.asr.int(1);
        let last = int_op(self.asr, len, BinOp::Sub, one);

        let outer = std::mem::take(&mut *self.out);
        let i = self.asr.var(iterator);
        let item = self.item(ExprKind::ListItem { a: value, pos: i, ty: elem });
        self.element(item, depth)?;
        let i = self.asr.var(iterator);
        let more = self.asr.compare(i, CmpOp::Lt, last);
        let comma = self.asr.string(", ");
        let (sep, end) = (self.asr.string(""), self.asr.string(""));
        let comma = print_with(self.asr, vec![comma], Some(sep), Some(end));
        let guard = self.asr.if_stmt(more, vec![comma], vec![]);
        self.out.push(guard);
        let body = std::mem::replace(&mut *self.out, outer);

        let (i, zero) = (self.asr.var(iterator), self.asr.int(0));
        self.out.push(self.asr.do_loop(i, zero, last, None, body));
        Ok(())
    }

    /// Print one item of a container: strings quoted, containers recursively.
    fn element(&mut self, item: ExprId, depth: usize) -> PassResult {
        if is_container(self.asr, item) {
            let end = self.asr.string("");
            return self.container(item, Some(end), depth + 1);
        }
        if self.asr.expr_type(item).is_some_and(Ttype::is_character) {
            let quote = self.asr.string("'");
            let close = self.asr.string("'");
            self.piece(vec![quote, item, close]);
        } else {
            self.piece(vec![item]);
        }
        Ok(())
    }

    fn item(&mut self, kind: ExprKind) -> ExprId {
        self.asr.add_expr(Location::initial(), kind)
    }
}

#[cfg(test)]
mod tests {
    use lasr_lang_asr::{SymbolId, builder};
    use lasr_lang_verify::verify;

    use super::*;

    fn program(ty: Ttype) -> (Asr, SymbolId, SymtabId, ExprId) {
        let mut asr = Asr::new();
        let main = builder::add_program(&mut asr, "main").unwrap();
        let scope = asr.symbol(main).symtab().unwrap();
        let value = builder::add_variable(&mut asr, scope, "value", ty).unwrap();
        let value = asr.var(value);
        (asr, main, scope, value)
    }

    fn printed(asr: &Asr, stmt: StmtId) -> (Vec<String>, Option<String>) {
        let StmtKind::Print { values, end, .. } = &asr.stmt(stmt).kind else {
            panic!("expected a print");
        };
        let text = |e: ExprId| match &asr.expr(e).kind {
            ExprKind::StringConstant { s, .. } => s.clone(),
            _ => "<value>".to_owned(),
        };
        (values.iter().map(|v| text(*v)).collect(), end.map(text))
    }

    #[test]
    fn list_prints_brackets_around_a_loop() {
        let (mut asr, main, scope, list) = program(Ttype::List(Box::new(Ttype::int())));
        let label = asr.string("values:");
        let stmt = asr.print(vec![label, list]);
        builder::push_stmt(&mut asr, main, stmt);

        print_list_tuple(&mut asr, &PassOptions::default()).unwrap();
        verify(&asr, true).unwrap();

        let body = asr.symbol(main).body().unwrap().clone();
        assert_eq!(body.len(), 4);
        assert_eq!(printed(&asr, body[0]), (vec!["values:".to_owned()], Some(" ".to_owned())));
        assert_eq!(printed(&asr, body[1]), (vec!["[".to_owned()], Some(String::new())));
        let StmtKind::DoLoop { head, body: inner } = &asr.stmt(body[2]).kind else {
            panic!("expected a do loop");
        };
        assert_eq!(asr.var_symbol(head.v), asr.symtab(scope).get("__list_iterator"));
        assert_eq!(asr.const_int(head.start), Some(0));
        assert!(matches!(asr.stmt(inner[1]).kind, StmtKind::If { .. }));
        assert_eq!(printed(&asr, body[3]), (vec!["]".to_owned()], None));
    }

    #[test]
    fn tuple_items_are_unrolled_and_strings_quoted() {
        let ty = Ttype::Tuple(vec![Ttype::int(), Ttype::character(3)]);
        let (mut asr, main, _, tuple) = program(ty);
        let stmt = asr.print(vec![tuple]);
        builder::push_stmt(&mut asr, main, stmt);

        print_list_tuple(&mut asr, &PassOptions::default()).unwrap();
        verify(&asr, true).unwrap();

        let body = asr.symbol(main).body().unwrap().clone();
        let pieces: Vec<_> = body.iter().map(|s| printed(&asr, *s).0).collect();
        let expected: Vec<Vec<&str>> =
            vec![vec!["("], vec!["<value>"], vec![", "], vec!["'", "<value>", "'"], vec![")"]];
        assert_eq!(pieces, expected);
    }

    #[test]
    fn prints_without_containers_stay() {
        let (mut asr, main, _, value) = program(Ttype::int());
        let stmt = asr.print(vec![value]);
        builder::push_stmt(&mut asr, main, stmt);

        print_list_tuple(&mut asr, &PassOptions::default()).unwrap();
        assert_eq!(asr.symbol(main).body().unwrap(), &vec![stmt]);
    }
}
