//! Declarative counter schemas for the driver and frontend subsystems.
//!
//! Each schema is a fixed, build-time table of counter names. The
//! [`counter_schema!`] macro generates the plain `u64` aggregate struct and
//! a `FIELDS` descriptor slice from a single table, so storage, diffing and
//! serialization order all come from one source of truth.

/// A single entry in a counter schema: the fully qualified serialized name
/// plus accessors for the corresponding struct field.
///
/// The accessor pair lets callers walk two instances of the same schema in
/// lockstep (e.g. current counters against a last-known snapshot) without
/// naming any field in code.
pub struct CounterField<C> {
    /// Fully qualified key, `"<Schema>.<CounterName>"`.
    pub name: &'static str,
    pub get: fn(&C) -> u64,
    pub set: fn(&mut C, u64),
}

/// Generates a counter aggregate from a declarative name table.
///
/// The table drives three things: the struct fields, the serialized key of
/// each counter (`"<prefix>.<Name>"`), and the declaration order used by
/// diffing and serialization.
#[macro_export]
macro_rules! counter_schema {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident, prefix = $prefix:literal {
            $( $cname:literal => $field:ident, )+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Default, Clone, PartialEq, Eq, ::serde::Serialize)]
        $vis struct $name {
            $( pub $field: u64, )+
        }

        impl $name {
            /// Key prefix shared by every counter in this schema.
            pub const PREFIX: &'static str = $prefix;

            /// Schema entries in declaration order.
            pub const FIELDS: &'static [$crate::counters::CounterField<$name>] = &[
                $(
                    $crate::counters::CounterField {
                        name: concat!($prefix, ".", $cname),
                        get: |c: &$name| c.$field,
                        set: |c: &mut $name, v: u64| c.$field = v,
                    },
                )+
            ];
        }
    };
}

counter_schema! {
    /// Always-on counters for the frontend subsystem.
    ///
    /// Values only increase while a job is active, with one exception:
    /// `num_source_lines_per_second` is derived and assigned exactly once
    /// at reporter finalization.
    pub struct FrontendCounters, prefix = "Frontend" {
        "NumProcessFailures" => num_process_failures,
        "NumSourceBuffers" => num_source_buffers,
        "NumSourceLines" => num_source_lines,
        "NumSourceLinesPerSecond" => num_source_lines_per_second,
        "NumLinkLibraries" => num_link_libraries,
        "NumLoadedModules" => num_loaded_modules,
        "NumImportedModules" => num_imported_modules,
        "NumDecls" => num_decls,
        "NumLocalTypeDecls" => num_local_type_decls,
        "NumTypesValidated" => num_types_validated,
        "NumDeclsDeserialized" => num_decls_deserialized,
        "NumDeclsValidated" => num_decls_validated,
        "NumFunctionsTypechecked" => num_functions_typechecked,
        "NumConstraintScopes" => num_constraint_scopes,
        "NumIRGenFunctions" => num_irgen_functions,
        "NumLLVMBytesOutput" => num_llvm_bytes_output,
    }
}

counter_schema! {
    /// Always-on counters for the driver subsystem.
    ///
    /// `children_max_rss` is sampled once at reporter finalization from the
    /// OS (platform units, KiB on Linux); the rest accumulate normally.
    pub struct DriverCounters, prefix = "Driver" {
        "NumProcessFailures" => num_process_failures,
        "NumDriverJobsRun" => num_driver_jobs_run,
        "NumDriverJobsSkipped" => num_driver_jobs_skipped,
        "ChildrenMaxRSS" => children_max_rss,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fields_match_declaration_order() {
        let names: Vec<&str> = DriverCounters::FIELDS.iter().map(|f| f.name).collect();
        assert_eq!(
            names,
            vec![
                "Driver.NumProcessFailures",
                "Driver.NumDriverJobsRun",
                "Driver.NumDriverJobsSkipped",
                "Driver.ChildrenMaxRSS",
            ]
        );
    }

    #[test]
    fn test_accessors_alias_struct_fields() {
        let mut c = FrontendCounters::default();
        c.num_decls = 7;

        let field = FrontendCounters::FIELDS
            .iter()
            .find(|f| f.name == "Frontend.NumDecls")
            .unwrap();
        assert_eq!((field.get)(&c), 7);

        (field.set)(&mut c, 10);
        assert_eq!(c.num_decls, 10);
    }

    #[test]
    fn test_prefix_is_qualified_into_every_name() {
        for f in FrontendCounters::FIELDS {
            assert!(f.name.starts_with("Frontend."));
        }
        for f in DriverCounters::FIELDS {
            assert!(f.name.starts_with("Driver."));
        }
    }
}
