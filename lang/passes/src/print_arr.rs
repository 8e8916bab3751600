//! Lowers printing of arrays into loops printing one element at a time.

use lasr_lang_asr::{Asr, ExprId, StmtId, StmtKind, SymtabId};

use crate::options::PassOptions;
use crate::result::PassResult;
use crate::utils::{
    BodyCtx, BodyRewriter, Rewrite, element, index_variables, is_array, print_with, rewrite_bodies,
    set_loc, shape,
};

pub fn print_arr(asr: &mut Asr, _options: &PassOptions) -> PassResult {
    rewrite_bodies(&mut PrintArr, asr)
}

struct PrintArr;

/// The loops printing the elements of `value`, `None` if it cannot be taken apart.
fn element_loops(asr: &mut Asr, scope: SymtabId, value: ExprId) -> PassResult<Option<Vec<StmtId>>> {
    if !is_array(asr, value) {
        return Ok(None);
    }
    let Some(extents) = shape(asr, value).filter(|extents| !extents.is_empty()) else {
        return Ok(None);
    };
    let indices = index_variables(asr, scope, "__print_i", extents.len())?;
    let pos: Vec<ExprId> = indices.iter().map(|index| asr.var(*index)).collect();
    let Some(elem) = element(asr, value, &pos) else {
        return Ok(None);
    };

    let space = asr.string(" ");
    let mut body = vec![print_with(asr, vec![elem], None, Some(space))];
    let innermost = extents.len() - 1;
    for (axis, (index, extent)) in indices.iter().zip(&extents).enumerate().rev() {
        if axis < innermost {
            // one line per row
            body.push(asr.print(vec![]));
        }
        let (v, one) = (asr.var(*index), asr.int(1));
        body = vec![asr.do_loop(v, one, *extent, None, body)];
    }
    Ok(Some(body))
}

impl BodyRewriter for PrintArr {
    fn rewrite_stmt(&mut self, asr: &mut Asr, ctx: BodyCtx, stmt: StmtId) -> PassResult<Rewrite> {
        let StmtKind::Print { values, separator, end } = asr.stmt(stmt).kind.clone() else {
            return Ok(Rewrite::Keep);
        };
        if !values.iter().any(|value| is_array(asr, *value)) {
            return Ok(Rewrite::Keep);
        }

        let mut out = Vec::new();
        let mut plain = Vec::new();
        let last = values.len() - 1;
        let mut lowered_any = false;
        for (k, value) in values.into_iter().enumerate() {
            let Some(loops) = element_loops(asr, ctx.scope, value)? else {
                plain.push(value);
                continue;
            };
            lowered_any = true;
            if !plain.is_empty() {
                let gap = separator.unwrap_or_else(|| asr.string(" "));
                out.push(print_with(asr, std::mem::take(&mut plain), separator, Some(gap)));
            }
            out.extend(loops);
            let after = if k == last {
                end
            } else {
                Some(separator.unwrap_or_else(|| asr.string(" ")))
            };
            out.push(print_with(asr, vec![], None, after));
        }
        if !lowered_any {
            return Ok(Rewrite::Keep);
        }
        if !plain.is_empty() {
            out.push(print_with(asr, plain, separator, end));
        }
        let loc = asr.stmt(stmt).loc;
        set_loc(asr, &out, loc);
        Ok(Rewrite::Replace(out))
    }
}

#[cfg(test)]
mod tests {
    use lasr_lang_asr::{ExprKind, SymbolId, Ttype, builder};
    use lasr_lang_verify::verify;

    use super::*;

    fn program(shape: &[i64]) -> (Asr, SymbolId, ExprId) {
        let mut asr = Asr::new();
        let main = builder::add_program(&mut asr, "main").unwrap();
        let scope = asr.symbol(main).symtab().unwrap();
        let ty = builder::array_of(&mut asr, Ttype::int(), shape);
        let a = builder::add_variable(&mut asr, scope, "a", ty).unwrap();
        let a = asr.var(a);
        (asr, main, a)
    }

    fn kinds(asr: &Asr, body: &[StmtId]) -> Vec<&'static str> {
        body.iter()
            .map(|s| match &asr.stmt(*s).kind {
                StmtKind::Print { values, .. } if values.is_empty() => "newline",
                StmtKind::Print { .. } => "print",
                StmtKind::DoLoop { .. } => "do",
                _ => "?",
            })
            .collect()
    }

    #[test]
    fn array_between_scalars_is_split() {
        let (mut asr, main, a) = program(&[3]);
        let (before, after) = (asr.string("a ="), asr.string("done"));
        let stmt = asr.print(vec![before, a, after]);
        builder::push_stmt(&mut asr, main, stmt);

        print_arr(&mut asr, &PassOptions::default()).unwrap();
        verify(&asr, true).unwrap();

        let body = asr.symbol(main).body().unwrap().clone();
        assert_eq!(kinds(&asr, &body), ["print", "do", "newline", "print"]);
        let StmtKind::DoLoop { head, body: inner } = &asr.stmt(body[1]).kind else { panic!() };
        assert_eq!(asr.const_int(head.end), Some(3));
        let StmtKind::Print { values, .. } = &asr.stmt(inner[0]).kind else { panic!() };
        assert!(matches!(asr.expr(values[0]).kind, ExprKind::ArrayItem { v, .. } if v == a));
        // the last value keeps the original line ending
        let StmtKind::Print { end, .. } = asr.stmt(body[3]).kind else { panic!() };
        assert_eq!(end, None);
    }

    #[test]
    fn rank_two_prints_a_line_per_row() {
        let (mut asr, main, a) = program(&[2, 3]);
        let stmt = asr.print(vec![a]);
        builder::push_stmt(&mut asr, main, stmt);

        print_arr(&mut asr, &PassOptions::default()).unwrap();
        verify(&asr, true).unwrap();

        let body = asr.symbol(main).body().unwrap().clone();
        assert_eq!(kinds(&asr, &body), ["do", "newline"]);
        let StmtKind::DoLoop { head, body: rows } = &asr.stmt(body[0]).kind else { panic!() };
        assert_eq!(asr.const_int(head.end), Some(2));
        assert_eq!(kinds(&asr, rows), ["do", "newline"]);
    }

    #[test]
    fn scalar_prints_stay() {
        let (mut asr, main, _) = program(&[3]);
        let text = asr.string("hello");
        let stmt = asr.print(vec![text]);
        builder::push_stmt(&mut asr, main, stmt);

        print_arr(&mut asr, &PassOptions::default()).unwrap();
        assert_eq!(asr.symbol(main).body().unwrap(), &vec![stmt]);
    }
}
