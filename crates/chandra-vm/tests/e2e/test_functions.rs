use super::helpers::*;
use chandra_compiler::ast::Expr;
use chandra_core::error::RuntimeError;
use chandra_core::value::Value;
use chandra_vm::Vm;

// ---- Parameter binding ----

#[test]
fn test_missing_arguments_pad_with_nil() {
    // local function f(a, b, c) return a, b, c end; return f(1)
    let results = run_nested(
        &[],
        vec![
            local_func(
                "f",
                &["a", "b", "c"],
                info(&[], false, false),
                vec![ret(vec![name("a"), name("b"), name("c")])],
            ),
            ret(vec![call_expr(name("f"), vec![num(1.0)])]),
        ],
    );
    assert_num(&results, 0, 1.0);
    assert_nil(&results, 1);
    assert_nil(&results, 2);
}

#[test]
fn test_extra_arguments_discarded() {
    let results = run_nested(
        &[],
        vec![
            local_func(
                "f",
                &["a"],
                info(&[], false, false),
                vec![ret(vec![name("a")])],
            ),
            ret(vec![call_expr(
                name("f"),
                vec![num(1.0), num(2.0), num(3.0)],
            )]),
        ],
    );
    assert_eq!(results.len(), 1);
    assert_num(&results, 0, 1.0);
}

#[test]
fn test_chunk_receives_positional_arguments() {
    let chunk = compile_chunk(
        &["a", "b"],
        info(&[], false, false),
        vec![ret(vec![add(name("a"), name("b"))])],
    );
    let results = run_chunk(&chunk, &sim().env, &[Value::Number(4.0), Value::Number(5.0)]);
    assert_num(&results, 0, 9.0);
}

// ---- Varargs ----

#[test]
fn test_vararg_forwards_argument_tail() {
    // local function f(a, ...) return ... end; return f(1, 2, 3)
    let results = run_nested(
        &[],
        vec![
            local_func(
                "f",
                &["a", "..."],
                info(&[], false, false),
                vec![ret(vec![Expr::Vararg])],
            ),
            ret(vec![call_expr(
                name("f"),
                vec![num(1.0), num(2.0), num(3.0)],
            )]),
        ],
    );
    assert_eq!(results.len(), 2);
    assert_num(&results, 0, 2.0);
    assert_num(&results, 1, 3.0);
}

#[test]
fn test_vararg_truncated_when_not_last() {
    // local function f(...) local a, b = ..., 9 return a, b end
    // a non-last vararg contributes only its first value
    let results = run_nested(
        &[],
        vec![
            local_func(
                "f",
                &["..."],
                info(&[], false, false),
                vec![
                    local(&["a", "b"], vec![Expr::Vararg, num(9.0)]),
                    ret(vec![name("a"), name("b")]),
                ],
            ),
            ret(vec![call_expr(
                name("f"),
                vec![num(7.0), num(8.0)],
            )]),
        ],
    );
    assert_num(&results, 0, 7.0);
    assert_num(&results, 1, 9.0);
}

#[test]
fn test_vararg_expands_in_call_arguments() {
    // local function sum3(a, b, c) return a + b + c end
    // local function f(...) return sum3(...) end
    // return f(1, 2, 3)
    let results = run_nested(
        &["sum3"],
        vec![
            local_func(
                "sum3",
                &["a", "b", "c"],
                info(&[], false, false),
                vec![ret(vec![add(add(name("a"), name("b")), name("c"))])],
            ),
            local_func(
                "f",
                &["..."],
                info(&[], false, true),
                vec![ret(vec![call_expr(name("sum3"), vec![Expr::Vararg])])],
            ),
            ret(vec![call_expr(
                name("f"),
                vec![num(1.0), num(2.0), num(3.0)],
            )]),
        ],
    );
    assert_num(&results, 0, 6.0);
}

// ---- Tail calls ----

#[test]
fn test_deep_tail_recursion_runs_in_constant_stack() {
    // local function loop(i) if i <= 0 then return 0 end return loop(i - 1) end
    // return loop(10000) — far past the call-depth guard, provable only with
    // frame reuse
    let results = run_chunk(
        &compile_chunk(
            &[],
            info(&["loop"], true, false),
            vec![
                local_func(
                    "loop",
                    &["i"],
                    info(&[], false, true),
                    vec![
                        if_then(le(name("i"), num(0.0)), vec![ret(vec![num(0.0)])]),
                        ret(vec![call_expr(
                            name("loop"),
                            vec![sub(name("i"), num(1.0))],
                        )]),
                    ],
                ),
                ret(vec![call_expr(name("loop"), vec![num(10000.0)])]),
            ],
        ),
        &sim().env,
        &[],
    );
    assert_num(&results, 0, 0.0);
}

#[test]
fn test_non_tail_recursion_hits_depth_guard() {
    // returning (loop(i - 1)) aggregates, so every call keeps its frame
    let chunk = compile_chunk(
        &[],
        info(&["loop"], true, false),
        vec![
            local_func(
                "loop",
                &["i"],
                info(&[], false, true),
                vec![
                    if_then(le(name("i"), num(0.0)), vec![ret(vec![num(0.0)])]),
                    ret(vec![paren(call_expr(
                        name("loop"),
                        vec![sub(name("i"), num(1.0))],
                    ))]),
                ],
            ),
            ret(vec![call_expr(name("loop"), vec![num(10000.0)])]),
        ],
    );
    let err = Vm::new().invoke(&chunk, &sim().env, &[]).unwrap_err();
    assert!(matches!(err, RuntimeError::StackOverflow));
}

#[test]
fn test_tail_call_to_native() {
    let s = sim();
    s.env
        .set_global("seven", native_const("seven", vec![Value::Number(7.0)]))
        .unwrap();
    let chunk = compile_chunk(
        &[],
        info(&[], false, false),
        vec![ret(vec![call_expr(name("seven"), vec![])])],
    );
    let results = run_chunk(&chunk, &s.env, &[]);
    assert_num(&results, 0, 7.0);
}

// ---- Function values ----

#[test]
fn test_anonymous_function_expression() {
    // local f = function(x) return x + 1 end; return f(4)
    let results = run_nested(
        &[],
        vec![
            local(
                &["f"],
                vec![func(
                    &["x"],
                    info(&[], false, false),
                    vec![ret(vec![add(name("x"), num(1.0))])],
                )],
            ),
            ret(vec![call_expr(name("f"), vec![num(4.0)])]),
        ],
    );
    assert_num(&results, 0, 5.0);
}

#[test]
fn test_global_function_declaration() {
    // function g(x) return x * x end; return g(6)
    use chandra_compiler::ast::FunctionDecl;
    use chandra_core::runtime::BinOp;
    let results = run_nested(
        &[],
        vec![
            chandra_compiler::ast::Stmt::Function(FunctionDecl {
                target: name("g"),
                method: None,
                local: false,
                body: body(
                    &["x"],
                    info(&[], false, false),
                    vec![ret(vec![Expr::bin(BinOp::Mul, name("x"), name("x"))])],
                ),
                line: 0,
            }),
            ret(vec![call_expr(name("g"), vec![num(6.0)])]),
        ],
    );
    assert_num(&results, 0, 36.0);
}

#[test]
fn test_function_stored_in_table_field() {
    // local t = {}; function t.f(x) return x - 1 end; return t.f(5)
    use chandra_compiler::ast::FunctionDecl;
    let results = run_nested(
        &[],
        vec![
            local(&["t"], vec![Expr::Table { fields: vec![], line: 0 }]),
            chandra_compiler::ast::Stmt::Function(FunctionDecl {
                target: Expr::index(name("t"), str_lit("f")),
                method: None,
                local: false,
                body: body(
                    &["x"],
                    info(&[], false, false),
                    vec![ret(vec![sub(name("x"), num(1.0))])],
                ),
                line: 0,
            }),
            ret(vec![call_expr(
                Expr::index(name("t"), str_lit("f")),
                vec![num(5.0)],
            )]),
        ],
    );
    assert_num(&results, 0, 4.0);
}
