use super::helpers::*;
use chandra_compiler::ast::{Call, CallArg, Expr, Stmt};
use chandra_core::multi::MultiValue;
use chandra_core::value::Value;
use chandra_vm::Vm;

fn two_returner() -> Stmt {
    local_func(
        "two",
        &[],
        info(&[], false, false),
        vec![ret(vec![num(1.0), num(2.0)])],
    )
}

// ---- Argument fixup ----

#[test]
fn test_trailing_call_expands_into_args() {
    // local function sum3(a, b, c) return a + b + c end
    // return sum3(10, two())
    let results = run_nested(
        &[],
        vec![
            two_returner(),
            local_func(
                "sum3",
                &["a", "b", "c"],
                info(&[], false, false),
                vec![ret(vec![add(add(name("a"), name("b")), name("c"))])],
            ),
            ret(vec![call_expr(
                name("sum3"),
                vec![num(10.0), call_expr(name("two"), vec![])],
            )]),
        ],
    );
    assert_num(&results, 0, 13.0);
}

#[test]
fn test_non_last_call_contributes_first_value() {
    // return sum3(two(), 10, 100)  -- two() truncated to 1
    let results = run_nested(
        &[],
        vec![
            two_returner(),
            local_func(
                "sum3",
                &["a", "b", "c"],
                info(&[], false, false),
                vec![ret(vec![add(add(name("a"), name("b")), name("c"))])],
            ),
            ret(vec![call_expr(
                name("sum3"),
                vec![call_expr(name("two"), vec![]), num(10.0), num(100.0)],
            )]),
        ],
    );
    assert_num(&results, 0, 111.0);
}

#[test]
fn test_paren_adjusts_trailing_call_to_one() {
    // return (two())
    let results = run_nested(
        &[],
        vec![two_returner(), ret(vec![paren(call_expr(name("two"), vec![]))])],
    );
    assert_eq!(results.len(), 1);
    assert_num(&results, 0, 1.0);
}

#[test]
fn test_return_list_expansion() {
    // return 7, two()
    let results = run_nested(
        &[],
        vec![two_returner(), ret(vec![num(7.0), call_expr(name("two"), vec![])])],
    );
    assert_eq!(results.len(), 3);
    assert_num(&results, 0, 7.0);
    assert_num(&results, 1, 1.0);
    assert_num(&results, 2, 2.0);
}

#[test]
fn test_return_list_truncates_non_last() {
    // return two(), 9
    let results = run_nested(
        &[],
        vec![two_returner(), ret(vec![call_expr(name("two"), vec![]), num(9.0)])],
    );
    assert_eq!(results.len(), 2);
    assert_num(&results, 0, 1.0);
    assert_num(&results, 1, 9.0);
}

// ---- Method calls ----

#[test]
fn test_method_call_binds_receiver() {
    // local t = {}; t.v = 10
    // function t:m(a) return self.v + a end
    // return t:m(5)
    let results = run_nested(&[], vec![
        local(&["t"], vec![Expr::Table { fields: vec![], line: 0 }]),
        assign(
            vec![Expr::index(name("t"), str_lit("v"))],
            vec![num(10.0)],
        ),
        method_func(
            name("t"),
            "m",
            &["a"],
            info(&[], false, false),
            vec![ret(vec![add(
                Expr::index(name("self"), str_lit("v")),
                name("a"),
            )])],
        ),
        ret(vec![Expr::Call(Box::new(method_call(
            name("t"),
            "m",
            vec![num(5.0)],
        )))]),
    ]);
    assert_num(&results, 0, 15.0);
}

#[test]
fn test_dotted_call_evaluates_container_once() {
    // counting table reads requires a native; instead check the value path:
    // local t = {}; t.f = function() return 4 end; return t.f()
    let results = run_nested(
        &[],
        vec![
            local(&["t"], vec![Expr::Table { fields: vec![], line: 0 }]),
            assign(
                vec![Expr::index(name("t"), str_lit("f"))],
                vec![func(&[], info(&[], false, false), vec![ret(vec![num(4.0)])])],
            ),
            ret(vec![call_expr(
                Expr::index(name("t"), str_lit("f")),
                vec![],
            )]),
        ],
    );
    assert_num(&results, 0, 4.0);
}

// ---- Native dispatch, selector, by-ref ----

#[test]
fn test_native_receives_overload_selector() {
    // echo_sel(...) returns its selector as a number
    let s = sim();
    s.env
        .set_global(
            "echo_sel",
            native("echo_sel", |_, cx| {
                let v = match cx.selector {
                    Some(sel) => Value::Number(sel as f64),
                    None => Value::Nil,
                };
                Ok(MultiValue::from_values(vec![v]))
            }),
        )
        .unwrap();
    let mut call = Call::new(name("echo_sel"), vec![]);
    call.overload = Some(2);
    let chunk = compile_chunk(
        &[],
        info(&[], false, false),
        vec![ret(vec![Expr::Call(Box::new(call))])],
    );
    let results = run_chunk(&chunk, &s.env, &[]);
    assert_num(&results, 0, 2.0);
}

#[test]
fn test_by_ref_output_written_back_to_variable() {
    // store42(byref x): the native writes 42 into argument slot 0
    let s = sim();
    s.env
        .set_global(
            "store42",
            native("store42", |_, cx| {
                assert_eq!(cx.by_ref, vec![0]);
                cx.args.set(0, Value::Number(42.0));
                Ok(MultiValue::empty())
            }),
        )
        .unwrap();
    let call = Call {
        args: vec![CallArg::by_ref(name("x"))],
        ..Call::new(name("store42"), vec![])
    };
    let chunk = compile_chunk(
        &[],
        info(&[], false, false),
        vec![
            local(&["x"], vec![num(0.0)]),
            Stmt::Call(call),
            ret(vec![name("x")]),
        ],
    );
    let results = run_chunk(&chunk, &s.env, &[]);
    assert_num(&results, 0, 42.0);
}

#[test]
fn test_by_ref_output_written_back_to_indexer() {
    // store42(byref t[3]) leaves t[3] == 42
    let s = sim();
    s.env
        .set_global(
            "store42",
            native("store42", |_, cx| {
                cx.args.set(0, Value::Number(42.0));
                Ok(MultiValue::empty())
            }),
        )
        .unwrap();
    let call = Call {
        args: vec![CallArg::by_ref(Expr::index(name("t"), num(3.0)))],
        ..Call::new(name("store42"), vec![])
    };
    let chunk = compile_chunk(
        &[],
        info(&[], false, false),
        vec![
            local(&["t"], vec![Expr::Table { fields: vec![], line: 0 }]),
            Stmt::Call(call),
            ret(vec![Expr::index(name("t"), num(3.0))]),
        ],
    );
    let results = run_chunk(&chunk, &s.env, &[]);
    assert_num(&results, 0, 42.0);
}

#[test]
fn test_chunk_overload_entry_forwards_byref_args() {
    // the overload-aware chunk entry point: outputs land in the caller's
    // argument multi-value
    let s = sim();
    s.env
        .set_global(
            "bump",
            native("bump", |_, cx| {
                let n = cx.args.get(0).as_number().unwrap_or(0.0);
                Ok(MultiValue::from_values(vec![Value::Number(n + 1.0)]))
            }),
        )
        .unwrap();
    let chunk = compile_chunk(
        &["a"],
        info(&[], false, false),
        vec![ret(vec![call_expr(name("bump"), vec![name("a")])])],
    );
    let args = MultiValue::from_values(vec![Value::Number(6.0)]);
    let results = Vm::new()
        .invoke_overload(&chunk, &s.env, None, args, &[])
        .unwrap();
    assert_eq!(results.first(), Value::Number(7.0));
}

#[test]
fn test_call_results_discarded_in_statement_position() {
    // two(); return 5
    let results = run_nested(
        &[],
        vec![
            two_returner(),
            call_stmt(name("two"), vec![]),
            ret(vec![num(5.0)]),
        ],
    );
    assert_eq!(results.len(), 1);
    assert_num(&results, 0, 5.0);
}
