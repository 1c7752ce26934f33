//! Whole-pipeline tests: configuration, assembly, picking and export
