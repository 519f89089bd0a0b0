//! Prints every CRD served by the operator as one YAML stream, ready for
//! `kubectl apply -f -`.

use netris_operator_core::resources::crd::v1alpha1::all_crds;

fn main() {
    for crd in all_crds() {
        let manifest = serde_yaml::to_string(&crd).expect("CRD didn't serialize");
        print!("---\n{manifest}");
    }
}
