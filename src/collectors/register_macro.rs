macro_rules! register_collectors {
    (
        $(
            $module:ident
        ),* $(,)?
    ) => {
        // Import all task modules
        $(
            pub mod $module;
        )*

        /// Every built-in task, ordered lexicographically by task name so
        /// output ordering is reproducible across runs.
        pub fn all_tasks() -> &'static [ScrapeTask] {
            static TASKS: Lazy<Vec<ScrapeTask>> = Lazy::new(|| {
                let mut tasks: Vec<ScrapeTask> = Vec::new();
                $(
                    tasks.extend_from_slice($module::TASKS);
                )*
                tasks.sort_by_key(|t| t.name);
                tasks
            });
            &TASKS
        }
    };
}
