// Registry test module
#[cfg(test)]
mod dependency_tests;
#[cfg(test)]
mod manager_tests;
