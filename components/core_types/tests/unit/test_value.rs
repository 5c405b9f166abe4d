//! Unit tests for Cell and VarType

use core_types::{format_double, Cell, VarType};

#[cfg(test)]
mod cell_tests {
    use super::*;

    #[test]
    fn test_cell_var_type() {
        assert_eq!(Cell::Int(1).var_type(), VarType::Int);
        assert_eq!(Cell::Double(1.0).var_type(), VarType::Double);
        assert_eq!(Cell::empty_string().var_type(), VarType::String);
    }

    #[test]
    fn test_zero_of_value_types() {
        assert_eq!(Cell::zero_of(VarType::Int), Some(Cell::Int(0)));
        assert_eq!(Cell::zero_of(VarType::Double), Some(Cell::Double(0.0)));
        assert_eq!(Cell::zero_of(VarType::String), Some(Cell::empty_string()));
        assert_eq!(Cell::zero_of(VarType::Void), None);
        assert_eq!(Cell::zero_of(VarType::Invalid), None);
    }

    #[test]
    fn test_string_cells_share_buffer_on_clone() {
        let a = Cell::string("shared").unwrap();
        let b = a.clone();
        let (pa, pb) = (a.as_str().unwrap(), b.as_str().unwrap());
        assert_eq!(pa.as_ptr(), pb.as_ptr());
    }

    #[test]
    fn test_display_double_cell() {
        assert_eq!(Cell::Double(2.0).to_string(), "2");
        assert_eq!(Cell::Double(0.5).to_string(), "0.5");
    }
}

#[cfg(test)]
mod var_type_tests {
    use super::*;

    #[test]
    fn test_value_types() {
        assert!(VarType::Int.is_value_type());
        assert!(VarType::Double.is_value_type());
        assert!(VarType::String.is_value_type());
        assert!(!VarType::Void.is_value_type());
        assert!(!VarType::Invalid.is_value_type());
    }

    #[test]
    fn test_var_type_display() {
        assert_eq!(VarType::String.to_string(), "string");
    }
}

#[cfg(test)]
mod format_tests {
    use super::*;

    #[test]
    fn test_format_small_and_large() {
        assert_eq!(format_double(1e-5), "1e-05");
        assert_eq!(format_double(2.5e-7), "2.5e-07");
        assert_eq!(format_double(-1e100), "-1e+100");
        assert_eq!(format_double(100.0), "100");
    }

    #[test]
    fn test_format_nan_and_negative_zero() {
        assert_eq!(format_double(f64::NAN), "nan");
        assert_eq!(format_double(-0.0), "-0");
    }
}
