//! Emitting specializations on first use.

use tempo_ast::{ClassDef, FuncRef};
use tempo_core::{CompilationError, Span, TypeHash};

use crate::bytecode::Callee;
use crate::emit::Emitter;
use crate::program::ClassRecord;

type Result<T> = std::result::Result<T, CompilationError>;

impl<'reg, 'ast> Emitter<'reg, 'ast> {
    /// Callee for a use of a generic function with concrete arguments.
    ///
    /// The body is emitted once per `(template, args)`; a use inside its own
    /// specialization gets a ticket for the code being built.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub(crate) fn specialize_function(&mut self, func: &FuncRef<'_>, span: Span) -> Result<Callee> {
        let args: Vec<TypeHash> = func
            .template_args
            .iter()
            .map(|&arg| self.resolve_type(arg))
            .collect();
        let key = TypeHash::from_template_instance(func.hash, &args);

        if let Some(code) = self.lookup_code(key) {
            return Ok(Callee::Code(code));
        }
        if self.templates.cache.is_in_progress(key) {
            return Ok(Callee::Pending(self.tickets.ticket(key, func.name, span)));
        }
        let def = self.templates.func(func.hash).ok_or_else(|| {
            CompilationError::MissingSpecialization {
                name: func.name.to_string(),
                span,
            }
        })?;

        self.templates.cache.begin(key);
        self.templates.push_substitution(def.template_params, &args);
        let result = self.emit_function_body(def, key, &args);
        self.templates.pop_substitution();
        self.templates.cache.end(key);

        let code = result?;
        self.install_specialization(key, code.clone());
        self.templates.cache.cache_function(func.hash, args, key);
        Ok(Callee::Code(code))
    }

    /// Class record for `ty`, emitting a generic class specialization if
    /// this is its first use.
    ///
    /// Returns `None` for types without an initializer (builtins) and for a
    /// specialization that is still being emitted.
    pub(crate) fn ensure_class(&mut self, ty: TypeHash, span: Span) -> Result<Option<ClassRecord>> {
        let ty = self.resolve_type(ty);
        if let Some(record) = self.class_record(ty) {
            return Ok(Some(record.clone()));
        }
        let registry = self.registry;
        let Some(instance) = registry.template_of(ty) else {
            return Ok(None);
        };
        if self.templates.cache.is_in_progress(ty) {
            return Ok(None);
        }
        let def = self.templates.class(instance.template).ok_or_else(|| {
            CompilationError::MissingSpecialization {
                name: registry.name_of(instance.template),
                span,
            }
        })?;
        self.specialize_class(def, ty, &instance.args).map(Some)
    }

    /// Emit the initializer and methods of one class specialization.
    pub(crate) fn specialize_class(
        &mut self,
        def: &'ast ClassDef<'ast>,
        instance: TypeHash,
        args: &[TypeHash],
    ) -> Result<ClassRecord> {
        if let Some(record) = self.class_record(instance) {
            return Ok(record.clone());
        }
        self.templates.cache.begin(instance);
        self.templates.push_substitution(def.template_params, args);
        let result = self.emit_class(def, instance, args);
        self.templates.pop_substitution();
        self.templates.cache.end(instance);

        let record = result?;
        self.templates
            .cache
            .cache_class(def.ty, args.to_vec(), instance);
        Ok(record)
    }
}
