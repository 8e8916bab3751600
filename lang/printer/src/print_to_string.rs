use crate::PrintCfg;
use crate::PrintInCtx;

use super::Print;
use super::PrintExt;

pub trait PrintToString {
    fn print_to_string(&self, cfg: Option<&PrintCfg>) -> String;
}

impl<T: for<'a> Print<'a>> PrintToString for T {
    fn print_to_string(&self, cfg: Option<&PrintCfg>) -> String {
        let mut buf = Vec::new();
        let def = PrintCfg::default();
        let cfg = cfg.unwrap_or(&def);
        <T as PrintExt>::print(self, cfg, &mut buf).expect("Failed to print to string");
        String::from_utf8_lossy(&buf).into_owned()
    }
}

pub trait PrintToStringInCtx<C> {
    fn print_to_string_in_ctx(&self, ctx: &C, cfg: Option<&PrintCfg>) -> String;
}

impl<C, T: for<'a> PrintInCtx<'a, Ctx = C>> PrintToStringInCtx<C> for T {
    fn print_to_string_in_ctx(&self, ctx: &C, cfg: Option<&PrintCfg>) -> String {
        let alloc = super::Alloc::new();
        let mut buf = Vec::new();
        let def = PrintCfg::default();
        let cfg = cfg.unwrap_or(&def);
        {
            let doc_builder = self.print_in_ctx(cfg, ctx, &alloc);
            doc_builder.1.render(cfg.width, &mut buf).expect("Failed to print to string");
        }
        String::from_utf8_lossy(&buf).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use crate::{Alloc, Builder, DocAllocator, Print, PrintCfg};

    use super::PrintToString;

    struct Word(&'static str);

    impl<'a> Print<'a> for Word {
        fn print(&'a self, _cfg: &PrintCfg, alloc: &'a Alloc<'a>) -> Builder<'a> {
            alloc.text(self.0).append(alloc.line()).append(alloc.text(self.0)).group()
        }
    }

    #[test]
    fn fits_on_one_line() {
        assert_eq!(Word("word").print_to_string(None), "word word");
    }

    #[test]
    fn breaks_when_too_narrow() {
        let cfg = PrintCfg { width: 5, ..PrintCfg::default() };
        assert_eq!(Word("word").print_to_string(Some(&cfg)), "word\nword");
    }
}
