//! Crate-level end-to-end tests covering whole invocations.

use std::sync::Arc;

use conduit_wire_types::{NamedPayload, WireValue};

use crate::broker::{HandlerCandidate, HandlerRegistry, HandlerSignature, ParamDescriptor};
use crate::dispatcher::Dispatcher;
use crate::value::{RuntimeValue, ValueShape};


fn dispatcher_with(id: &str, candidate: HandlerCandidate) -> Dispatcher {
    let mut registry = HandlerRegistry::new();
    registry.register(id, candidate);
    Dispatcher::new(Arc::new(registry))
}

#[test]
fn string_echo_through_named_binding() {
    let signature = HandlerSignature::new(
        vec![ParamDescriptor::named("message", ValueShape::Text)],
        Some(ValueShape::Text),
    );
    let dispatcher = dispatcher_with(
        "echo",
        HandlerCandidate::new(signature, |call| Ok(call.argument(0).cloned())),
    );

    let outputs = dispatcher
        .dispatch(
            "echo",
            vec![NamedPayload::new("message", WireValue::string("hello"))],
        )
        .expect("dispatch");
    assert_eq!(
        outputs,
        vec![NamedPayload::new("$return", WireValue::string("hello"))]
    );
}

#[test]
fn serialised_list_binds_as_collection_of_strings() {
    let signature = HandlerSignature::new(
        vec![ParamDescriptor::list("messages", ValueShape::Text)],
        Some(ValueShape::Int),
    );
    let dispatcher = dispatcher_with(
        "count",
        HandlerCandidate::new(signature, |call| {
            let Some(RuntimeValue::List(items)) = call.argument(0) else {
                return Ok(Some(RuntimeValue::Int(-1)));
            };
            assert_eq!(
                items,
                &vec![
                    RuntimeValue::Text("a".into()),
                    RuntimeValue::Text("b".into())
                ]
            );
            Ok(Some(RuntimeValue::Int(i64::try_from(items.len()).unwrap_or(i64::MAX))))
        }),
    );

    let outputs = dispatcher
        .dispatch(
            "count",
            vec![NamedPayload::new(
                "messages",
                WireValue::string(r#"["a","b"]"#),
            )],
        )
        .expect("dispatch");
    assert_eq!(
        outputs,
        vec![NamedPayload::new("$return", WireValue::Int { value: 2 })]
    );
}

#[test]
fn output_binding_round_trips_and_unset_degrades() {
    let signature = HandlerSignature::new(
        vec![
            ParamDescriptor::output("output", ValueShape::Text),
            ParamDescriptor::output("untouched", ValueShape::Text),
        ],
        None,
    );
    let dispatcher = dispatcher_with(
        "writer",
        HandlerCandidate::new(signature, |call| {
            call.set_output("output", RuntimeValue::Text("x".into()))?;
            Ok(None)
        }),
    );

    let outputs = dispatcher.dispatch("writer", vec![]).expect("dispatch");
    assert_eq!(
        outputs,
        vec![
            NamedPayload::new("output", WireValue::string("x")),
            NamedPayload::new("untouched", WireValue::json("null")),
        ]
    );
}

#[test]
fn mixed_inputs_and_outputs_bind_in_declaration_order() {
    let signature = HandlerSignature::new(
        vec![
            ParamDescriptor::named("name", ValueShape::Text),
            ParamDescriptor::output("greeting", ValueShape::Text),
            ParamDescriptor::named("times", ValueShape::Int),
        ],
        None,
    );
    let dispatcher = dispatcher_with(
        "greet",
        HandlerCandidate::new(signature, |call| {
            let name = match call.argument(0) {
                Some(RuntimeValue::Text(text)) => text.clone(),
                _ => String::new(),
            };
            let times = match call.argument(2) {
                Some(RuntimeValue::Int(count)) => *count,
                _ => 0,
            };
            call.set_output(
                "greeting",
                RuntimeValue::Text(format!("hello {name} x{times}")),
            )?;
            Ok(None)
        }),
    );

    let outputs = dispatcher
        .dispatch(
            "greet",
            vec![
                NamedPayload::new("name", WireValue::string("ada")),
                // Arrives as a serialised scalar and reaches the Int
                // parameter through the relaxed tier.
                NamedPayload::new("times", WireValue::string("2")),
            ],
        )
        .expect("dispatch");
    assert_eq!(
        outputs,
        vec![NamedPayload::new(
            "greeting",
            WireValue::string("hello ada x2")
        )]
    );
}

#[test]
fn overloads_fall_through_to_the_first_full_bind() {
    let strict = HandlerSignature::new(
        vec![ParamDescriptor::named("payload", ValueShape::Bool)],
        Some(ValueShape::Text),
    );
    let lenient = HandlerSignature::new(
        vec![ParamDescriptor::named("payload", ValueShape::Json)],
        Some(ValueShape::Text),
    );
    let mut registry = HandlerRegistry::new();
    registry.register(
        "flex",
        HandlerCandidate::new(strict, |_call| {
            Ok(Some(RuntimeValue::Text("bool overload".into())))
        }),
    );
    registry.register(
        "flex",
        HandlerCandidate::new(lenient, |_call| {
            Ok(Some(RuntimeValue::Text("document overload".into())))
        }),
    );
    let dispatcher = Dispatcher::new(Arc::new(registry));

    let outputs = dispatcher
        .dispatch(
            "flex",
            vec![NamedPayload::new("payload", WireValue::json(r#"{"a":1}"#))],
        )
        .expect("dispatch");
    assert_eq!(
        outputs,
        vec![NamedPayload::new(
            "$return",
            WireValue::string("document overload")
        )]
    );
}
