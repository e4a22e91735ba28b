use oxc_allocator::Allocator;
use oxc_ast::ast::{
    Class, ClassElement, Declaration, Expression, FormalParameters, Function, MethodDefinitionKind,
    PropertyKey, Statement, TSEnumMemberName, TSInterfaceDeclaration, TSMethodSignatureKind,
    TSModuleDeclaration, TSModuleDeclarationBody, TSModuleDeclarationName, TSSignature, TSType,
    TSTypeAnnotation, TSTypeParameterDeclaration,
};
use oxc_parser::Parser;
use oxc_span::{GetSpan, SourceType};
use tracing::{debug, instrument};

use crate::decl::*;
use crate::diagnostic::Diagnostic;
use crate::source::{FileId, SourceFile, Span};

/// Keywords allowed between a documentation block and the declaration it documents
const MODIFIERS: &[&str] = &[
    "export",
    "declare",
    "default",
    "abstract",
    "static",
    "readonly",
    "public",
    "private",
    "protected",
    "async",
    "const",
];

/// Parse one declaration file and lower it to owned declarations.
///
/// The arena holding the parser's AST only lives for the duration of this call.
#[instrument(level = "trace", skip(source), fields(path = %source.path().display()))]
pub(crate) fn parse_file(file: FileId, source: &SourceFile) -> Result<Vec<Decl>, Vec<Diagnostic>> {
    let allocator = Allocator::default();
    let ret = Parser::new(&allocator, source.text(), SourceType::d_ts()).parse();

    if !ret.errors.is_empty() || ret.panicked {
        let mut diagnostics: Vec<Diagnostic> = ret
            .errors
            .iter()
            .map(|e| {
                let (start, len) = e
                    .labels
                    .as_ref()
                    .and_then(|labels| labels.first())
                    .map(|l| (l.offset() as u32, l.len() as u32))
                    .unwrap_or((0, 0));
                Diagnostic::new(Span::new(file, start, start + len), e.to_string())
            })
            .collect();

        if diagnostics.is_empty() {
            diagnostics.push(Diagnostic::new(Span::new(file, 0, 0), "parser gave up on this file"));
        }
        return Err(diagnostics);
    }

    let text = source.text();
    let docs = ret
        .program
        .comments
        .iter()
        .filter(|c| c.is_block())
        .map(|c| c.span)
        .filter(|s| {
            let body = &text[s.start as usize..s.end as usize];
            body.starts_with("/**") && body.len() > 4
        })
        .collect();

    let lowerer = Lowerer { file, text, docs };
    let decls = lowerer.statements(&ret.program.body);
    debug!("lowered {} top-level declarations", decls.len());
    Ok(decls)
}

struct Lowerer<'s> {
    file: FileId,
    text: &'s str,
    docs: Vec<oxc_span::Span>,
}

impl<'s> Lowerer<'s> {
    fn span(&self, span: oxc_span::Span) -> Span {
        Span::new(self.file, span.start, span.end)
    }

    /// The documentation block ending right before `start`, skipping only whitespace and modifiers
    fn doc_before(&self, start: u32) -> Option<Doc> {
        let idx = self.docs.partition_point(|s| s.end <= start);
        let span = *self.docs.get(idx.checked_sub(1)?)?;

        let gap = self.text.get(span.end as usize..start as usize)?;
        if !gap.split_whitespace().all(|w| MODIFIERS.contains(&w)) {
            return None;
        }

        let raw = &self.text[span.start as usize..span.end as usize];
        let text = raw
            .strip_prefix("/**")
            .and_then(|s| s.strip_suffix("*/"))
            .unwrap_or("")
            .to_string();

        Some(Doc {
            span: self.span(span),
            text,
        })
    }

    fn statements(&self, body: &[Statement]) -> Vec<Decl> {
        let mut out = Vec::new();
        for stmt in body {
            let anchor = stmt.span().start;
            match stmt {
                Statement::ExportNamedDeclaration(export) => {
                    if let Some(decl) = &export.declaration {
                        self.declaration(decl, anchor, &mut out);
                    }
                }
                _ => {
                    if let Some(decl) = stmt.as_declaration() {
                        self.declaration(decl, anchor, &mut out);
                    }
                }
            }
        }
        out
    }

    fn declaration(&self, decl: &Declaration, anchor: u32, out: &mut Vec<Decl>) {
        let doc = self.doc_before(anchor);
        match decl {
            Declaration::VariableDeclaration(var) => {
                for d in var.declarations.iter() {
                    let Some(name) = d.id.get_identifier_name() else {
                        continue;
                    };
                    out.push(Decl {
                        name: name.to_string(),
                        span: self.span(d.span),
                        doc: doc.clone(),
                        kind: DeclKind::Variable(VariableDecl {
                            ty: self.annotation(d.type_annotation.as_deref()),
                        }),
                    });
                }
            }
            Declaration::FunctionDeclaration(f) => {
                if let Some(id) = &f.id {
                    out.push(Decl {
                        name: id.name.to_string(),
                        span: self.span(f.span),
                        doc,
                        kind: DeclKind::Function(self.function(f)),
                    });
                }
            }
            Declaration::ClassDeclaration(c) => {
                if let Some(id) = &c.id {
                    out.push(Decl {
                        name: id.name.to_string(),
                        span: self.span(c.span),
                        doc,
                        kind: DeclKind::Class(self.class(c)),
                    });
                }
            }
            Declaration::TSInterfaceDeclaration(i) => out.push(Decl {
                name: i.id.name.to_string(),
                span: self.span(i.span),
                doc,
                kind: DeclKind::Class(self.interface(i)),
            }),
            Declaration::TSTypeAliasDeclaration(a) => out.push(Decl {
                name: a.id.name.to_string(),
                span: self.span(a.span),
                doc,
                kind: DeclKind::TypeAlias(TypeAliasDecl {
                    type_params: type_params(a.type_parameters.as_deref()),
                    ty: self.ty(&a.type_annotation),
                }),
            }),
            Declaration::TSEnumDeclaration(e) => {
                let members = e
                    .body
                    .members
                    .iter()
                    .map(|m| EnumMember {
                        name: match &m.id {
                            TSEnumMemberName::Identifier(ident) => ident.name.to_string(),
                            TSEnumMemberName::String(lit) | TSEnumMemberName::ComputedString(lit) => {
                                lit.value.to_string()
                            }
                            TSEnumMemberName::ComputedTemplateString(_) => "<computed>".to_string(),
                        },
                        span: self.span(m.span),
                        doc: self.doc_before(m.span.start),
                        has_initializer: m.initializer.is_some(),
                    })
                    .collect();

                out.push(Decl {
                    name: e.id.name.to_string(),
                    span: self.span(e.span),
                    doc,
                    kind: DeclKind::Enum(EnumDecl {
                        is_const: e.r#const,
                        members,
                    }),
                });
            }
            Declaration::TSModuleDeclaration(m) => self.module(m, doc, out),
            Declaration::TSGlobalDeclaration(g) => out.extend(self.statements(&g.body.body)),
            Declaration::TSImportEqualsDeclaration(_) => {}
        }
    }

    fn module(&self, m: &TSModuleDeclaration, doc: Option<Doc>, out: &mut Vec<Decl>) {
        let body = match &m.body {
            Some(TSModuleDeclarationBody::TSModuleBlock(block)) => self.statements(&block.body),
            Some(TSModuleDeclarationBody::TSModuleDeclaration(inner)) => {
                let mut nested = Vec::new();
                self.module(inner, None, &mut nested);
                nested
            }
            None => Vec::new(),
        };

        match &m.id {
            TSModuleDeclarationName::Identifier(id) => out.push(Decl {
                name: id.name.to_string(),
                span: self.span(m.span),
                doc,
                kind: DeclKind::Namespace(body),
            }),
            // `declare module "foo"` contributes its declarations without a namespace segment
            TSModuleDeclarationName::StringLiteral(_) => out.extend(body),
        }
    }

    fn class(&self, c: &Class) -> ClassDecl {
        let mut heritage = Vec::new();
        if let Some(sup) = &c.super_class {
            heritage.push(Heritage {
                name: expression_name(sup),
                span: self.span(sup.span()),
            });
        }
        for imp in c.implements.iter() {
            heritage.push(Heritage {
                name: Some(imp.expression.to_string()),
                span: self.span(imp.span),
            });
        }

        let mut members = Vec::new();
        for element in c.body.body.iter() {
            let member = match element {
                ClassElement::MethodDefinition(m) => {
                    let kind = match m.kind {
                        MethodDefinitionKind::Constructor => {
                            MemberKind::Constructor(self.function(&m.value))
                        }
                        MethodDefinitionKind::Method => MemberKind::Method(self.function(&m.value)),
                        MethodDefinitionKind::Get => {
                            MemberKind::Getter(self.annotation(m.value.return_type.as_deref()))
                        }
                        MethodDefinitionKind::Set => {
                            MemberKind::Setter(self.params(&m.value.params).into_iter().next())
                        }
                    };
                    let name = if matches!(m.kind, MethodDefinitionKind::Constructor) {
                        "constructor".to_string()
                    } else {
                        key_name(&m.key)
                    };
                    Member {
                        name,
                        span: self.span(m.span),
                        doc: self.doc_before(m.span.start),
                        is_static: m.r#static,
                        is_readonly: false,
                        is_optional: m.optional,
                        kind,
                    }
                }
                ClassElement::PropertyDefinition(p) => Member {
                    name: key_name(&p.key),
                    span: self.span(p.span),
                    doc: self.doc_before(p.span.start),
                    is_static: p.r#static,
                    is_readonly: p.readonly,
                    is_optional: p.optional,
                    kind: MemberKind::Property(self.annotation(p.type_annotation.as_deref())),
                },
                ClassElement::AccessorProperty(a) => self.unsupported(a.span, "auto-accessor property"),
                ClassElement::TSIndexSignature(s) => self.unsupported(s.span, "index signature"),
                ClassElement::StaticBlock(_) => continue,
            };
            members.push(member);
        }

        ClassDecl {
            is_interface: false,
            type_params: type_params(c.type_parameters.as_deref()),
            heritage,
            members,
        }
    }

    fn interface(&self, i: &TSInterfaceDeclaration) -> ClassDecl {
        let heritage = i
            .extends
            .iter()
            .map(|h| Heritage {
                name: expression_name(&h.expression),
                span: self.span(h.span),
            })
            .collect();

        ClassDecl {
            is_interface: true,
            type_params: type_params(i.type_parameters.as_deref()),
            heritage,
            members: self.signatures(&i.body.body),
        }
    }

    fn signatures(&self, body: &[TSSignature]) -> Vec<Member> {
        body.iter()
            .map(|sig| match sig {
                TSSignature::TSPropertySignature(p) => Member {
                    name: key_name(&p.key),
                    span: self.span(p.span),
                    doc: self.doc_before(p.span.start),
                    is_static: false,
                    is_readonly: p.readonly,
                    is_optional: p.optional,
                    kind: MemberKind::Property(self.annotation(p.type_annotation.as_deref())),
                },
                TSSignature::TSMethodSignature(m) => {
                    let kind = match m.kind {
                        TSMethodSignatureKind::Method => MemberKind::Method(self.signature(
                            m.span,
                            m.type_parameters.as_deref(),
                            &m.params,
                            m.return_type.as_deref(),
                        )),
                        TSMethodSignatureKind::Get => {
                            MemberKind::Getter(self.annotation(m.return_type.as_deref()))
                        }
                        TSMethodSignatureKind::Set => {
                            MemberKind::Setter(self.params(&m.params).into_iter().next())
                        }
                    };
                    Member {
                        name: key_name(&m.key),
                        span: self.span(m.span),
                        doc: self.doc_before(m.span.start),
                        is_static: false,
                        is_readonly: false,
                        is_optional: m.optional,
                        kind,
                    }
                }
                TSSignature::TSConstructSignatureDeclaration(c) => Member {
                    name: "constructor".to_string(),
                    span: self.span(c.span),
                    doc: self.doc_before(c.span.start),
                    is_static: false,
                    is_readonly: false,
                    is_optional: false,
                    kind: MemberKind::Constructor(self.signature(
                        c.span,
                        c.type_parameters.as_deref(),
                        &c.params,
                        c.return_type.as_deref(),
                    )),
                },
                TSSignature::TSCallSignatureDeclaration(c) => self.unsupported(c.span, "call signature"),
                TSSignature::TSIndexSignature(s) => self.unsupported(s.span, "index signature"),
            })
            .collect()
    }

    fn unsupported(&self, span: oxc_span::Span, what: &'static str) -> Member {
        Member {
            name: self.text[span.start as usize..span.end as usize].to_string(),
            span: self.span(span),
            doc: self.doc_before(span.start),
            is_static: false,
            is_readonly: false,
            is_optional: false,
            kind: MemberKind::Unsupported(what),
        }
    }

    fn function(&self, f: &Function) -> Signature {
        self.signature(
            f.span,
            f.type_parameters.as_deref(),
            &f.params,
            f.return_type.as_deref(),
        )
    }

    fn signature(
        &self,
        span: oxc_span::Span,
        tparams: Option<&TSTypeParameterDeclaration>,
        params: &FormalParameters,
        ret: Option<&TSTypeAnnotation>,
    ) -> Signature {
        Signature {
            span: self.span(span),
            type_params: type_params(tparams),
            params: self.params(params),
            ret: self.annotation(ret),
        }
    }

    fn params(&self, params: &FormalParameters) -> Vec<Param> {
        let mut out: Vec<Param> = params
            .items
            .iter()
            .enumerate()
            .map(|(i, p)| Param {
                name: p
                    .pattern
                    .get_identifier_name()
                    .map(|n| n.to_string())
                    .unwrap_or_else(|| format!("arg{i}")),
                span: self.span(p.span),
                doc: self.doc_before(p.span.start),
                ty: self.annotation(p.type_annotation.as_deref()),
                optional: p.optional,
                rest: false,
            })
            .collect();

        if let Some(rest) = &params.rest {
            out.push(Param {
                name: rest
                    .rest
                    .argument
                    .get_identifier_name()
                    .map(|n| n.to_string())
                    .unwrap_or_else(|| "rest".to_string()),
                span: self.span(rest.span),
                doc: self.doc_before(rest.span.start),
                ty: self.annotation(rest.type_annotation.as_deref()),
                optional: false,
                rest: true,
            });
        }

        out
    }

    fn annotation(&self, ann: Option<&TSTypeAnnotation>) -> Option<TypeNode> {
        ann.map(|a| self.ty(&a.type_annotation))
    }

    fn ty(&self, t: &TSType) -> TypeNode {
        let span = self.span(t.span());
        let kind = match t {
            TSType::TSAnyKeyword(_) => TypeKind::Keyword(Keyword::Any),
            TSType::TSUnknownKeyword(_) => TypeKind::Keyword(Keyword::Unknown),
            TSType::TSNeverKeyword(_) => TypeKind::Keyword(Keyword::Never),
            TSType::TSBooleanKeyword(_) => TypeKind::Keyword(Keyword::Boolean),
            TSType::TSNumberKeyword(_) => TypeKind::Keyword(Keyword::Number),
            TSType::TSBigIntKeyword(_) => TypeKind::Keyword(Keyword::BigInt),
            TSType::TSStringKeyword(_) => TypeKind::Keyword(Keyword::String),
            TSType::TSSymbolKeyword(_) => TypeKind::Keyword(Keyword::Symbol),
            TSType::TSObjectKeyword(_) => TypeKind::Keyword(Keyword::Object),
            TSType::TSVoidKeyword(_) => TypeKind::Keyword(Keyword::Void),
            TSType::TSUndefinedKeyword(_) => TypeKind::Keyword(Keyword::Undefined),
            TSType::TSNullKeyword(_) => TypeKind::Keyword(Keyword::Null),
            TSType::TSThisType(_) => TypeKind::Keyword(Keyword::This),
            TSType::TSIntrinsicKeyword(_) => TypeKind::Keyword(Keyword::Intrinsic),
            TSType::TSArrayType(a) => TypeKind::Array(Box::new(self.ty(&a.element_type))),
            TSType::TSFunctionType(f) => TypeKind::Function(Box::new(self.signature(
                f.span,
                f.type_parameters.as_deref(),
                &f.params,
                Some(&*f.return_type),
            ))),
            TSType::TSLiteralType(_) | TSType::TSTemplateLiteralType(_) => {
                TypeKind::Literal(self.text[span.start as usize..span.end as usize].to_string())
            }
            TSType::JSDocNullableType(n) => TypeKind::Optional(Box::new(self.ty(&n.type_annotation))),
            TSType::TSUnionType(u) => TypeKind::Union(u.types.iter().map(|t| self.ty(t)).collect()),
            TSType::TSParenthesizedType(p) => return self.ty(&p.type_annotation),
            TSType::TSTypeReference(r) => TypeKind::Reference {
                name: r.type_name.to_string(),
                args: r
                    .type_arguments
                    .as_ref()
                    .map(|a| a.params.iter().map(|p| self.ty(p)).collect())
                    .unwrap_or_default(),
            },
            TSType::TSTypeLiteral(l) => TypeKind::Object(self.signatures(&l.members)),
            TSType::TSTupleType(_) => TypeKind::Other("tuple type"),
            TSType::TSIntersectionType(_) => TypeKind::Other("intersection type"),
            TSType::TSConstructorType(_) => TypeKind::Other("constructor type"),
            TSType::TSTypeOperatorType(_) => TypeKind::Other("type operator"),
            TSType::TSTypeQuery(_) => TypeKind::Other("typeof query"),
            TSType::TSIndexedAccessType(_) => TypeKind::Other("indexed access type"),
            TSType::TSConditionalType(_) => TypeKind::Other("conditional type"),
            TSType::TSMappedType(_) => TypeKind::Other("mapped type"),
            _ => TypeKind::Other("type expression"),
        };

        TypeNode { span, kind }
    }
}

fn type_params(decl: Option<&TSTypeParameterDeclaration>) -> Vec<String> {
    decl.map(|d| d.params.iter().map(|p| p.name.name.to_string()).collect())
        .unwrap_or_default()
}

fn key_name(key: &PropertyKey) -> String {
    key.static_name()
        .map(|n| n.to_string())
        .unwrap_or_else(|| "<computed>".to_string())
}

fn expression_name(expr: &Expression) -> Option<String> {
    match expr {
        Expression::Identifier(ident) => Some(ident.name.to_string()),
        Expression::StaticMemberExpression(m) => {
            expression_name(&m.object).map(|object| format!("{object}.{}", m.property.name))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use indoc::indoc;

    use super::*;
    use crate::source::SourceMap;

    fn lower(src: &str) -> Vec<Decl> {
        let mut sources = SourceMap::default();
        let id = sources.add("test.d.ts".into(), src.to_string());
        parse_file(id, sources.get(id)).expect("parse failed")
    }

    #[test]
    fn lower_class_members() {
        let decls = lower(indoc!(
            r#"
            /**
             * @namespace krit
             */
            export declare class Point extends Base {
                x: number;
                static readonly origin: Point;
                constructor(x: number, y?: number);
                get len(): number;
                set len(v: number);
                /** @skip */
                distance(p: Reference<Point>, ...rest: any[]): number;
            }
            "#
        ));

        assert_eq!(decls.len(), 1);
        let decl = &decls[0];
        assert_eq!(decl.name, "Point");
        assert!(decl.doc.as_ref().unwrap().text.contains("@namespace krit"));

        let DeclKind::Class(class) = &decl.kind else {
            panic!("expected a class");
        };
        assert!(!class.is_interface);
        assert_eq!(class.heritage[0].name.as_deref(), Some("Base"));

        let names: Vec<&str> = class.members.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, ["x", "origin", "constructor", "len", "len", "distance"]);

        assert!(class.members[1].is_static && class.members[1].is_readonly);
        assert!(matches!(class.members[3].kind, MemberKind::Getter(Some(_))));
        assert!(matches!(class.members[4].kind, MemberKind::Setter(Some(_))));
        assert_eq!(class.members[5].doc.as_ref().unwrap().text.trim(), "@skip");
        assert!(class.members[0].doc.is_none());

        let MemberKind::Constructor(ctor) = &class.members[2].kind else {
            panic!("expected a constructor");
        };
        assert_eq!(ctor.params.len(), 2);
        assert!(ctor.params[1].optional);

        let MemberKind::Method(distance) = &class.members[5].kind else {
            panic!("expected a method");
        };
        assert!(distance.params[1].rest);
        assert_eq!(distance.params[0].ty.as_ref().unwrap().to_string(), "Reference<Point>");
        assert_eq!(distance.params[1].ty.as_ref().unwrap().to_string(), "any[]");
    }

    #[test]
    fn lower_namespaces_and_types() {
        let decls = lower(indoc!(
            r#"
            declare namespace a.b {
                /** */ function f(cb: (x: number) => void, v: string | undefined): Array<integer>;
                type Alias = { a: number };
            }
            declare global {
                /** @namespace */
                const Log: { debug(msg: string): void };
            }
            declare const enum Flags { A, B = 2 }
            "#
        ));

        let names: Vec<&str> = decls.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, ["a", "Log", "Flags"]);

        let DeclKind::Namespace(a) = &decls[0].kind else {
            panic!("expected a namespace");
        };
        let DeclKind::Namespace(b) = &a[0].kind else {
            panic!("expected a nested namespace");
        };
        assert_eq!(a[0].name, "b");
        assert_eq!(b[0].name, "f");
        assert!(b[0].doc.is_some());

        let DeclKind::Function(f) = &b[0].kind else {
            panic!("expected a function");
        };
        assert!(matches!(f.params[0].ty.as_ref().unwrap().kind, TypeKind::Function(_)));
        assert_eq!(f.params[1].ty.as_ref().unwrap().to_string(), "string | undefined");
        assert_eq!(f.ret.as_ref().unwrap().to_string(), "Array<integer>");

        assert!(matches!(b[1].kind, DeclKind::TypeAlias(_)));
        assert!(decls[1].doc.as_ref().unwrap().text.contains("@namespace"));

        let DeclKind::Enum(flags) = &decls[2].kind else {
            panic!("expected an enum");
        };
        assert!(flags.is_const);
        assert!(!flags.members[0].has_initializer);
        assert!(flags.members[1].has_initializer);
    }

    #[test]
    fn doc_must_be_adjacent() {
        let decls = lower(indoc!(
            r#"
            /** @import a.h */
            declare const x: number;
            declare function f(): void;
            "#
        ));

        assert!(decls[0].doc.is_some());
        assert!(decls[1].doc.is_none());
    }

    #[test]
    fn parse_errors_are_reported() {
        let mut sources = SourceMap::default();
        let id = sources.add("bad.d.ts".into(), "declare class {{ x: ; }".to_string());
        let errors = parse_file(id, sources.get(id)).unwrap_err();
        assert!(!errors.is_empty());
    }
}
