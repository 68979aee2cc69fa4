#[cfg(test)]
mod test {
    use ark::value::Value;
    use ark::ArkState;

    fn run(program: &str) -> Value {
        let json: serde_json::Value = serde_json::from_str(program).unwrap();
        let state = ArkState::new();
        state.eval(&json).unwrap()
    }

    // test programs that return literals, mirroring the §8.2 seed scenarios
    // from the value model straight through the compiler and evaluator.
    #[test]
    fn test_value() {
        let tests = vec![
            (r#"null"#, Value::Null),
            (r#"true"#, Value::Bool(true)),
            (r#"["+", 1, 1]"#, Value::Num(2.0)),
            (r#"["str", ""]"#, Value::str("")),
            (r#"["str", "hello, world!"]"#, Value::str("hello, world!")),
            (r#"["get", ["prop", "length", ["list"]]]"#, Value::Num(0.0)),
            (r#"["get", ["prop", "length", ["list", 1, 2, 3, 4, 5]]]"#, Value::Num(5.0)),
        ];

        for (program, expected) in tests {
            assert_eq!(run(program), expected, "{program}");
        }
    }

    #[test]
    fn set_and_get_through_an_explicit_ref() {
        let program = r#"
            ["let", ["params", "a"],
                ["seq",
                    ["set", ["ref", "a"], 3],
                    ["get", "a"]]]
        "#;
        assert_eq!(run(program), Value::Num(3.0));
    }

    #[test]
    fn closures_capture_their_enclosing_frame() {
        let program = r#"
            ["let", ["params", "makeAdder"],
                ["seq",
                    ["set", ["ref", "makeAdder"],
                        ["fn", ["params", "x"],
                            ["fn", ["params", "y"], ["+", "x", "y"]]]],
                    [["get", "makeAdder", 10], 32]]]
        "#;
        assert_eq!(run(program), Value::Num(42.0));
    }

    #[test]
    fn self_recursive_closure_via_capture() {
        let program = r#"
            ["let", ["params", "fac"],
                ["seq",
                    ["set", ["ref", "fac"],
                        ["fn", ["params", "n"],
                            ["if", ["<=", "n", 1],
                                1,
                                ["*", "n", ["get", "fac", ["-", "n", 1]]]]]],
                    ["get", "fac", 6]]]
        "#;
        assert_eq!(run(program), Value::Num(720.0));
    }

    #[test]
    fn loop_with_break_and_continue() {
        let program = r#"
            ["let", ["params", "i", "sum"],
                ["seq",
                    ["set", ["ref", "i"], 0],
                    ["set", ["ref", "sum"], 0],
                    ["loop",
                        ["seq",
                            ["set", ["ref", "i"], ["+", "i", 1]],
                            ["if", ["<", "i", 10], ["continue"]],
                            ["if", ["=", "i", 10], ["break", "sum"]],
                            ["set", ["ref", "sum"], ["+", "sum", "i"]]]]]]
        "#;
        assert_eq!(run(program), Value::Num(0.0));
    }

    #[test]
    fn top_level_return_stops_the_program() {
        assert_eq!(run(r#"["seq", ["return", 1], 2]"#), Value::Num(1.0));
    }

    #[test]
    fn list_mutation_is_visible_through_every_reference() {
        let program = r#"
            ["let", ["params", "xs"],
                ["seq",
                    ["set", ["ref", "xs"], ["list", 1, 2]],
                    ["prop", "push", "xs", 3],
                    ["get", ["prop", "length", "xs"]]]]
        "#;
        assert_eq!(run(program), Value::Num(3.0));
    }

    #[test]
    fn undefined_symbols_are_reported_before_evaluation() {
        let json: serde_json::Value = serde_json::from_str(r#"["+", "nope", 1]"#).unwrap();
        let state = ArkState::new();
        assert!(state.eval(&json).is_err());
    }

    #[test]
    fn writing_through_a_bare_symbol_without_ref_is_rejected() {
        // `Set` requires its target to evaluate to a `Ref`; a bare symbol
        // auto-derefs, so omitting the explicit `"ref"` tag here must fail
        // rather than silently no-op.
        let program = r#"["let", ["params", "a"], ["set", "a", 1]]"#;
        let json: serde_json::Value = serde_json::from_str(program).unwrap();
        let state = ArkState::new();
        assert!(state.eval(&json).is_err());
    }

    #[test]
    fn string_interning_preserves_reference_equality() {
        let program = r#"["=", ["str", "same"], ["str", "same"]]"#;
        assert_eq!(run(program), Value::Bool(true));
    }
}
